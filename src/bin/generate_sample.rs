use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Deterministic PRNG (splitmix64) so sample files are reproducible.
struct SampleRng {
    state: u64,
}

impl SampleRng {
    fn new(seed: u64) -> Self {
        SampleRng { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
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

/// One alloy sample: composition fractions, anneal temperature and a
/// synthetic migration barrier.
struct Sample {
    material: String,
    frac_a: f64,
    frac_b: f64,
    temperature: f64,
    barrier: f64,
}

const HOSTS: [&str; 4] = ["Al", "Cu", "Ni", "Fe"];
const SOLUTES: [&str; 3] = ["Mg", "Zn", "Ti"];

fn generate(rng: &mut SampleRng, n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| {
            let host = HOSTS[i % HOSTS.len()];
            let solute = SOLUTES[(i / HOSTS.len()) % SOLUTES.len()];
            let frac_a = 0.05 + 0.9 * rng.next_f64();
            let frac_b = (1.0 - frac_a) * rng.next_f64();
            let temperature = 300.0 + 600.0 * rng.next_f64();
            let barrier =
                0.8 * frac_a - 0.5 * frac_b + 0.001 * temperature + rng.gauss(0.0, 0.02);
            Sample {
                material: format!("{host}-{solute}-{i:03}"),
                frac_a,
                frac_b,
                temperature,
                barrier,
            }
        })
        .collect()
}

fn write_samples(path: &Path, samples: &[Sample], with_target: bool) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec!["material", "frac_a", "frac_b", "temperature"];
    if with_target {
        header.push("barrier");
    }
    writer.write_record(&header)?;

    for s in samples {
        let mut record = vec![
            s.material.clone(),
            format!("{:.4}", s.frac_a),
            format!("{:.4}", s.frac_b),
            format!("{:.1}", s.temperature),
        ];
        if with_target {
            record.push(format!("{:.5}", s.barrier));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SampleRng::new(42);
    let train = generate(&mut rng, 120);
    let test = generate(&mut rng, 40);

    write_samples(&out_dir.join("train.csv"), &train, true)?;
    write_samples(&out_dir.join("test.csv"), &test, true)?;
    write_samples(&out_dir.join("test_unlabeled.csv"), &test, false)?;

    println!(
        "Wrote {} training and {} testing samples to {}",
        train.len(),
        test.len(),
        out_dir.display()
    );
    Ok(())
}
