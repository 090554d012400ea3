//! Built-in quest board used when no quest generator is available.

use super::Quest;

/// Every built-in quest, in board order.
pub fn all() -> Vec<Quest> {
    vec![
        Quest::new(
            "The Lost Amulet",
            "Widow Marra's silver amulet was stolen and hidden in the old chapel.",
            "Widow Marra",
        )
        .with_objective("Recover the silver amulet")
        .with_reward("40 silver and a widow's blessing")
        .with_location_hint("the ruined chapel on the hill"),
        Quest::new(
            "Wolves at the Mill",
            "Something has been killing sheep near the mill every night.",
            "Miller Hobb",
        )
        .with_objective("Track the wolves to their den")
        .with_objective("Destroy the wolves' den")
        .with_reward("a sack of flour and 25 silver")
        .with_location_hint("the millpond at the forest edge"),
        Quest::new(
            "The Missing Courier",
            "A courier carrying sealed letters never reached the crossroads inn.",
            "Captain Ilse",
        )
        .with_objective("Rescue the courier")
        .with_objective("Deliver the sealed letters")
        .with_reward("a captain's favor")
        .with_location_hint("the bandit-haunted forest road"),
        Quest::new(
            "Bones in the Barrow",
            "The dead walk near the old barrow and the village wants them quiet.",
            "Elder Brannoc",
        )
        .with_counted_objective("Put down the restless skeleton guards", 2)
        .with_reward("the barrow's old bronze sword")
        .with_location_hint("the barrow mound east of the village"),
        Quest::new(
            "The Herbalist's Request",
            "Old Tamsin needs rare moonpetal flowers before the frost.",
            "Tamsin the herbalist",
        )
        .with_counted_objective("Collect moonpetal flowers", 3)
        .with_reward("three healing draughts")
        .with_location_hint("the marsh meadows"),
    ]
}

/// `count` quests from the board, starting at `offset` and wrapping around.
pub fn options(offset: usize, count: usize) -> Vec<Quest> {
    let board = all();
    let len = board.len();
    board
        .into_iter()
        .cycle()
        .skip(offset % len)
        .take(count.min(len))
        .collect()
}
