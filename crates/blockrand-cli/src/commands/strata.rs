use std::error::Error;

use blockrand_core::{Stratum, FACTORS};

pub fn run() -> Result<(), Box<dyn Error>> {
    print!("{}", render());
    Ok(())
}

pub(crate) fn render() -> String {
    let mut out = String::new();
    for factor in FACTORS {
        out.push_str(&format!("{}: {}\n", factor.name, factor.levels.join(" | ")));
    }
    for stratum in Stratum::all() {
        out.push_str(&format!("{}\n", stratum.key()));
    }
    out
}
