//! The slice of stored history sent to the model.
//!
//! Retention trims history from the front without regard to turn structure,
//! so the stored turns can start mid-exchange. The model requires that a
//! conversation opens with a user prompt and that every `tool_use` block is
//! answered by a `tool_result` in the very next turn. This module aligns and
//! repairs the window; stored history is never modified.

use seomagic_core::message::{ContentBlock, Role, Turn, TurnContent};
use std::collections::HashSet;

/// Align `history` to a window the model will accept.
pub fn model_window(history: &[Turn]) -> Vec<Turn> {
    let Some(start) = history.iter().position(Turn::is_user_prompt) else {
        return Vec::new();
    };
    let turns = &history[start..];

    let mut window: Vec<Turn> = Vec::with_capacity(turns.len());
    for (i, turn) in turns.iter().enumerate() {
        match turn.role {
            Role::User => window.push(turn.clone()),
            Role::Assistant => {
                let answered = turns
                    .get(i + 1)
                    .filter(|next| next.role == Role::ToolResult)
                    .map(result_ids)
                    .unwrap_or_default();
                let blocks: Vec<ContentBlock> = turn
                    .blocks()
                    .into_iter()
                    .filter(|block| match block {
                        ContentBlock::ToolUse { id, .. } => answered.contains(id),
                        _ => true,
                    })
                    .collect();
                if !blocks.is_empty() {
                    window.push(with_blocks(turn, blocks));
                }
            }
            Role::ToolResult => {
                let asked = window
                    .last()
                    .filter(|prev| prev.role == Role::Assistant)
                    .map(use_ids)
                    .unwrap_or_default();
                let blocks: Vec<ContentBlock> = turn
                    .blocks()
                    .into_iter()
                    .filter(|block| match block {
                        ContentBlock::ToolResult { tool_use_id, .. } => asked.contains(tool_use_id),
                        _ => false,
                    })
                    .collect();
                if !blocks.is_empty() {
                    window.push(with_blocks(turn, blocks));
                }
            }
        }
    }
    window
}

fn with_blocks(turn: &Turn, blocks: Vec<ContentBlock>) -> Turn {
    Turn {
        content: TurnContent::Blocks(blocks),
        ..turn.clone()
    }
}

fn use_ids(turn: &Turn) -> HashSet<String> {
    turn.blocks()
        .into_iter()
        .filter_map(|b| match b {
            ContentBlock::ToolUse { id, .. } => Some(id),
            _ => None,
        })
        .collect()
}

fn result_ids(turn: &Turn) -> HashSet<String> {
    turn.blocks()
        .into_iter()
        .filter_map(|b| match b {
            ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id),
            _ => None,
        })
        .collect()
}
