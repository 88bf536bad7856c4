use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Skin temperature with a slow sleep-onset rise, in °C.
fn skin_temp(base: f64, minutes: f64, rise: f64, rng: &mut SimpleRng) -> f64 {
    let onset = 1.0 / (1.0 + (-(minutes - 60.0) / 20.0).exp());
    base + rise * onset + rng.gauss(0.0, 0.05)
}

fn write_sensor_file(
    path: &str,
    header: &[&str],
    start: NaiveDateTime,
    samples: usize,
    jitter_secs: i64,
    base_temp: f64,
    rise: f64,
    rng: &mut SimpleRng,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;

    for i in 0..samples {
        let ts = start + Duration::seconds(i as i64 * 30 + jitter_secs);
        let minutes = i as f64 * 0.5;
        // Every 50th row carries a broken timestamp to exercise row dropping.
        let time = if i % 50 == 49 {
            "--:--".to_string()
        } else {
            ts.format("%H:%M:%S").to_string()
        };
        writer.write_record([
            time,
            format!("{:.2}", skin_temp(base_temp, minutes, rise, rng)),
            format!("{:.2}", rng.gauss(21.0, 0.2)),
            format!("{:.0}", rng.gauss(62.0 - minutes / 30.0, 2.0)),
            format!("{:.3}", rng.gauss(0.0, 0.02)),
            format!("{:.3}", rng.gauss(0.0, 0.02)),
            format!("{:.3}", rng.gauss(1.0, 0.02)),
        ])?;
    }
    writer.flush()?;
    println!("Wrote {samples} rows to {path}");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = SimpleRng::new(42);

    // 22:30 → 02:30: crosses midnight once.
    let date = NaiveDate::from_ymd_opt(2025, 1, 1).ok_or("invalid date")?;
    let start = date.and_hms_opt(22, 30, 0).ok_or("invalid time")?;
    let stamp = date.format("%d-%m-%Y");
    let samples = 4 * 60 * 2;

    write_sensor_file(
        &format!("distal_{stamp}.csv"),
        &["Time", "Skin Temp (°C)", "Ambient Temp", "Heart Rate (bpm)", "Acc X", "Acc Y", "Acc Z"],
        start,
        samples,
        0,
        30.5,
        3.0,
        &mut rng,
    )?;
    write_sensor_file(
        &format!("proximal_{stamp}.csv"),
        &["timestamp", "skinT", "ambT", "HR", "accX", "accY", "accZ"],
        start,
        samples,
        12,
        34.5,
        -0.3,
        &mut rng,
    )?;

    let mut events = csv::Writer::from_path("events.csv")?;
    events.write_record(["start_time", "end_time", "event_type", "location", "notes"])?;
    events.write_record(["22:40:00", "22:55:00", "Shower", "home", ""])?;
    events.write_record(["23:10:00", "23:20:00", "Reading", "bed", "paper book"])?;
    events.write_record(["23:30:00", "02:15:00", "Sleep", "bed", "lights off"])?;
    events.flush()?;
    println!("Wrote 3 events to events.csv");

    Ok(())
}
