use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;

use tw_mechanics::dice::roll_d20;
use tw_mechanics::sheet::signed;
use tw_mechanics::{DiceNotation, Die, MechError, RollMode};

pub fn run(notation: &str, mode: RollMode, seed: Option<u64>) -> Result<(), String> {
    let parsed: DiceNotation = notation.parse().map_err(|e: MechError| e.to_string())?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    if mode == RollMode::Normal {
        let result = parsed.roll(&mut rng);
        println!("  {result}");
        println!("  Total: {}", result.total().to_string().bold());
        return Ok(());
    }

    if parsed.count() != 1 || parsed.die() != Die::D20 {
        return Err(format!("{mode} only applies to a single d20, not {parsed}"));
    }
    let d20 = roll_d20(mode, &mut rng);
    let total = d20.kept as i32 + parsed.modifier();
    println!("  {d20} {} = {total}", signed(parsed.modifier()));
    println!("  Total: {}", total.to_string().bold());
    Ok(())
}
