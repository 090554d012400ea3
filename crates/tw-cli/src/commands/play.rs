use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;

use tw_mechanics::CharacterSheet;
use tw_story::{GameMaster, GamePhase, Session, SessionConfig, TemplateNarrator, TurnResult};

pub struct PlayOptions {
    pub seed: u64,
    pub name: String,
    pub concept: Option<String>,
    pub max_turns: u32,
    pub load: Option<PathBuf>,
    pub save: Option<PathBuf>,
}

const HELP: &str = "\
  Type what your character does, e.g. \"search the ruins\" or \"talk to the innkeeper\".
  While choosing a quest, type its number. In combat: attack, defend, or flee.

  status   turn, phase, pacing, and health
  quest    the active quest and its objectives
  moments  the adventure's most memorable moments
  help     this text
  quit     leave (the session is saved if --save was given)";

pub fn run(opts: PlayOptions) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;

    let narrator = Arc::new(TemplateNarrator::new());
    let mut gm = match &opts.load {
        Some(path) => {
            let json = fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            let session = Session::from_json(&json)
                .map_err(|e| format!("cannot load {}: {e}", path.display()))?;
            let seed = session.config().seed.wrapping_add(u64::from(session.turn()));
            tracing::debug!(
                path = %path.display(),
                turn = session.turn(),
                phase = %session.phase(),
                "session loaded"
            );
            GameMaster::new(
                session,
                Box::new(StdRng::seed_from_u64(seed)),
                narrator.clone(),
                narrator,
            )
        }
        None => {
            let config = SessionConfig::default()
                .with_seed(opts.seed)
                .with_max_turns(opts.max_turns);
            GameMaster::seeded(Session::new(config), narrator.clone(), narrator)
        }
    };

    if gm.session().phase() == GamePhase::CharacterCreation {
        let mut sheet = CharacterSheet::new(opts.name.clone());
        if let Some(concept) = &opts.concept {
            sheet = sheet.with_concept(concept.clone());
        }
        gm.create_character(sheet).map_err(|e| e.to_string())?;
    }

    println!("  {} a new tale", "Beginning".bold());
    println!("  {}", gm.session().character_summary());
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    if gm.session().phase() == GamePhase::QuestSelection {
        let options = runtime
            .block_on(gm.open_quest_board())
            .map_err(|e| e.to_string())?;
        println!("  {}", "Quests on offer:".bold());
        for (i, quest) in options.iter().enumerate() {
            println!("  {}. {} ({})", i + 1, quest.title, quest.giver);
            println!("     {}", quest.description);
        }
        println!();
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    loop {
        if gm.session().is_over() {
            println!("  {}", "The End.".bold());
            break;
        }

        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "quit" | "q" => break,
            "help" => println!("{HELP}\n"),
            "status" => println!("{}\n", status_line(gm.session())),
            "quest" => match gm.session().active_quest() {
                Some(quest) => println!("{}\n", quest.describe()),
                None => println!("  No active quest.\n"),
            },
            "moments" => {
                let moments = gm.session().moments();
                if moments.is_empty() {
                    println!("  Nothing memorable yet.\n");
                }
                for moment in moments.moments() {
                    println!("  {moment}");
                }
                println!();
            }
            _ => match runtime.block_on(gm.take_turn(input)) {
                Ok(result) => print_turn(&result),
                Err(e) => println!("{}\n", e.to_string().yellow()),
            },
        }
    }

    if let Some(path) = &opts.save {
        let json = gm.session().to_json().map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), turn = gm.session().turn(), "session saved");
        println!("  Saved to {}", path.display());
    }

    Ok(())
}

fn status_line(session: &Session) -> String {
    format!(
        "  Turn {}/{} | {} | {} | HP {}",
        session.turn(),
        session.config().max_turns,
        session.phase(),
        session.pacing(),
        session.health()
    )
}

fn print_turn(result: &TurnResult) {
    println!("{}\n", result.narrative);

    if let Some(fight) = &result.encounter {
        println!(
            "  {} round {} | {} HP {} | you HP {}",
            "Combat".red().bold(),
            fight.round,
            fight.enemy,
            fight.enemy_health,
            fight.player_health
        );
    }

    if result.accepted {
        println!(
            "  {}",
            format!(
                "Turn {} | {} | {} | HP {}",
                result.turn, result.phase, result.pacing, result.health
            )
            .dimmed()
        );
    }

    if !result.choices.is_empty() {
        println!("  {} {}", "Try:".cyan(), result.choices.join(" / "));
    }
    println!();
}
