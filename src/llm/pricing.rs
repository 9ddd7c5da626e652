use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy)]
pub struct PriceEntry {
    pub input: f64,
    pub output: f64,
}

/// USD per million tokens. Unknown models cost $0.00 rather than failing.
pub static PRICING: LazyLock<HashMap<&'static str, PriceEntry>> = LazyLock::new(|| {
    HashMap::from([
        (
            "gemini-2.5-flash",
            PriceEntry {
                input: 0.30,
                output: 2.50,
            },
        ),
        (
            "gemini-2.5-pro",
            PriceEntry {
                input: 1.25,
                output: 10.00,
            },
        ),
        (
            "gemini-2.0-flash",
            PriceEntry {
                input: 0.10,
                output: 0.40,
            },
        ),
    ])
});

pub fn calculate_cost(model: &str, input_tokens: u32, output_tokens: u32) -> f64 {
    match PRICING.get(model) {
        Some(entry) => {
            (f64::from(input_tokens) * entry.input / 1_000_000.0)
                + (f64::from(output_tokens) * entry.output / 1_000_000.0)
        }
        None => 0.0,
    }
}

pub static PROVIDER_SERVERS: LazyLock<HashMap<&str, &str>> =
    LazyLock::new(|| HashMap::from([("gemini", "generativelanguage.googleapis.com")]));

pub static PROVIDER_PORTS: LazyLock<HashMap<&str, i64>> =
    LazyLock::new(|| HashMap::from([("gemini", 443_i64)]));
