// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 单次提取的状态
///
/// `Idle → Navigating → WaitingForContent → {Extracting | ContentTimedOut} → Done`，
/// `ContentTimedOut` 仍会进入 `Extracting`，导航失败时直接进入 `Done`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionState {
    Idle,
    Navigating,
    WaitingForContent,
    ContentTimedOut,
    Extracting,
    Done,
}

impl ExtractionState {
    /// 是否允许从当前状态转移到 `next`
    pub fn can_transition_to(self, next: ExtractionState) -> bool {
        use ExtractionState::*;
        matches!(
            (self, next),
            (Idle, Navigating)
                | (Navigating, WaitingForContent)
                | (Navigating, Done)
                | (WaitingForContent, Extracting)
                | (WaitingForContent, ContentTimedOut)
                | (ContentTimedOut, Extracting)
                | (Extracting, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == ExtractionState::Done
    }
}

impl fmt::Display for ExtractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionState::Idle => "idle",
            ExtractionState::Navigating => "navigating",
            ExtractionState::WaitingForContent => "waiting_for_content",
            ExtractionState::ContentTimedOut => "content_timed_out",
            ExtractionState::Extracting => "extracting",
            ExtractionState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal extraction transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: ExtractionState,
    pub to: ExtractionState,
}

/// 状态轨迹
///
/// 记录一次提取经过的全部状态，拒绝非法转移。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTrace {
    states: Vec<ExtractionState>,
}

impl Default for StateTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTrace {
    pub fn new() -> Self {
        Self {
            states: vec![ExtractionState::Idle],
        }
    }

    pub fn current(&self) -> ExtractionState {
        // never empty: starts with Idle
        self.states
            .last()
            .copied()
            .unwrap_or(ExtractionState::Idle)
    }

    pub fn advance(&mut self, next: ExtractionState) -> Result<(), IllegalTransition> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(IllegalTransition { from, to: next });
        }
        tracing::trace!(%from, to = %next, "extraction state change");
        self.states.push(next);
        Ok(())
    }

    pub fn states(&self) -> &[ExtractionState] {
        &self.states
    }

    pub fn into_states(self) -> Vec<ExtractionState> {
        self.states
    }
}
