use comfy_table::{ContentArrangement, Table};

use tw_mechanics::combat::bestiary;
use tw_mechanics::sheet::signed;

pub fn run() -> Result<(), String> {
    let enemies = bestiary::all();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "HP", "Defense", "Attack", "Damage", "Description"]);

    for enemy in &enemies {
        table.add_row(vec![
            enemy.name.clone(),
            enemy.max_health.to_string(),
            enemy.defense.to_string(),
            signed(enemy.attack_bonus),
            enemy.damage.to_string(),
            enemy.description.clone(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} enemies", enemies.len());

    Ok(())
}
