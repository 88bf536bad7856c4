/// Data layer: sensor/event parsing, alignment, merging and event windowing.
///
/// Architecture:
/// ```text
///  distal.csv   proximal.csv        events.csv / manual entries
///      │             │                        │
///      ▼             ▼                        │
///   ┌────────────────────┐                    │
///   │ headers + timestamp │  row → NormalizedSample (bad rows dropped)
///   └────────────────────┘                    │
///      │             │                        │
///      ▼             ▼                        │
///   ┌──────────┐                              │
///   │ rollover  │  shift by whole days at midnight crossings
///   └──────────┘                              │
///      │             │                        │
///      ▼             ▼                        ▼
///   ┌──────────┐                        ┌──────────┐
///   │  merge    │ ── date range ──────▶ │  events   │  → EventInterval
///   └──────────┘                        └──────────┘
///        │                                    │
///        ▼                                    ▼
///   Vec<MergedSample>                   ┌──────────┐
///                                       │  filter   │  toggles + chart domain
///                                       └──────────┘
/// ```
///
/// `loader::parse_and_merge` runs the whole chain and returns a new `Session`.

pub mod error;
pub mod events;
pub mod export;
pub mod filter;
pub mod headers;
pub mod loader;
pub mod merge;
pub mod model;
pub mod rollover;
pub mod timestamp;
