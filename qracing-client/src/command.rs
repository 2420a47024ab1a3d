// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Key → command mapping.
//!
//! Keys are browser key names (`"ArrowLeft"`, `"Escape"`, `"h"`, ...).
//! Gate and lane commands only go out while the race is running; the pause
//! toggle also goes out while paused so the player can resume.

use crate::phase::Phase;
use crate::protocol::{Command, Speed};

/// Map a key to its command, ignoring the session phase.
pub fn bind(key: &str) -> Option<Command> {
    let command = match key {
        "Escape" | "p" | "P" => Command::Pause,
        "h" | "H" => Command::Hadamard,
        "ArrowLeft" | "a" | "A" => Command::ShiftLeft,
        "ArrowRight" | "d" | "D" => Command::ShiftRight,
        "m" | "M" => Command::Measure,
        "1" => Command::SetSpeed { speed: Speed::Slow },
        "2" => Command::SetSpeed { speed: Speed::Normal },
        "3" => Command::SetSpeed { speed: Speed::Fast },
        _ => return None,
    };
    Some(command)
}

/// Whether a player command may be sent in `phase`.
pub fn permits(phase: Phase, command: &Command) -> bool {
    match command {
        Command::Pause => phase.is_active(),
        Command::Start { .. } | Command::Restart => false,
        _ => phase.is_running(),
    }
}

/// Encode a key press for the current phase.
pub fn encode(key: &str, phase: Phase) -> Option<Command> {
    bind(key).filter(|command| permits(phase, command))
}
