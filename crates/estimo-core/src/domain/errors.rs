//! Errors - エラー分類と状態遷移エラー

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{TaskId, TaskState};

/// ErrorKind は呼び出し側から見たエラーの分類
///
/// - InvalidParameter: 入力（precision / handle）が不正。同期的に 4xx 相当で返す
/// - ComputationFailure: kernel の実行中の失敗。Poll で `FAILED` として観測される
/// - InternalFault: protocol 層の想定外エラー。詳細は呼び出し側に漏らさない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidParameter,
    ComputationFailure,
    InternalFault,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::ComputationFailure => "computation_failure",
            ErrorKind::InternalFault => "internal_fault",
        };
        f.write_str(s)
    }
}

/// A state change the task state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task {task_id}: cannot transition from {from} to {to}")]
pub struct InvalidTransition {
    pub task_id: TaskId,
    pub from: TaskState,
    pub to: TaskState,
}
