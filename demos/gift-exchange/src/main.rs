//! Plays one office gift exchange against the in-memory store and prints
//! who buys for whom as JSON.
//!
//! ```text
//! cargo run -p gift-exchange                  # random draw
//! cargo run -p gift-exchange -- config.json   # settings from a file
//! RUST_LOG=debug cargo run -p gift-exchange   # show every step
//! ```

use santa::prelude::*;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Cast
// ---------------------------------------------------------------------------

const ORGANIZER: (u64, &str) = (100, "Nadia");

/// People the organizer invites personally.
const INVITED: &[(u64, &str)] = &[(101, "Bruno"), (102, "Chen"), (103, "Dalia")];

/// People who join with the room code posted in the team chat.
const WALK_INS: &[(u64, &str)] = &[(104, "Emeka"), (105, "Freya")];

const WISHES: &[(u64, &str)] = &[
    (101, "hot sauce, the hotter the better"),
    (103, "a paperback mystery"),
    (105, "fingerless gloves"),
];

#[derive(Serialize)]
struct Outcome {
    room: Room,
    pairs: Vec<Pair>,
}

#[derive(Serialize)]
struct Pair {
    giver: String,
    #[serde(flatten)]
    view: AssignmentView,
}

fn load_config() -> Result<SantaConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            Ok(SantaConfig::from_json_str(&json)?)
        }
        None => Ok(SantaConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let santa = SecretSantaBuilder::new()
        .config(load_config()?)
        .build(MemoryStore::new())?;

    let organizer = Identity(ORGANIZER.0);
    let room = santa
        .create_room("Team gift exchange", organizer, ORGANIZER.1)
        .await?;
    tracing::info!(room_id = %room.id, code = %room.code, "room open");

    for &(id, name) in INVITED {
        let invitation = santa.invite(room.id, organizer, Identity(id)).await?;
        santa.join_by_code(&invitation.code, Identity(id), name).await?;
    }
    for &(id, name) in WALK_INS {
        santa.join_by_code(&room.code, Identity(id), name).await?;
    }
    for &(id, wish) in WISHES {
        santa
            .rooms()
            .update_wish_list(room.id, Identity(id), Some(wish))
            .await?;
    }

    // Nobody but the organizer may draw.
    if let Err(e) = santa.draw(room.id, Identity(101)).await {
        tracing::info!(error = %e, "draw by a guest refused");
    }
    santa.draw(room.id, organizer).await?;

    // Late joiners are turned away once the draw is done.
    if let Err(e) = santa.join_by_code(&room.code, Identity(106), "Gus").await {
        tracing::info!(error = %e, "late join refused");
    }

    let participants = santa.list_participants(room.id, organizer).await?;
    let mut pairs = Vec::with_capacity(participants.len());
    for p in &participants {
        if let Some(view) = santa.my_assignment(room.id, p.identity).await? {
            pairs.push(Pair {
                giver: p.display_name.clone(),
                view,
            });
        }
    }

    let room = santa.rooms().find_room_by_code(&room.code).await?;
    let outcome = Outcome { room, pairs };
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
