// SPDX-FileCopyrightText: 2023 Rot127 <unisono@quyllur.org>
// SPDX-License-Identifier: LGPL-3.0-only

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Wires up the logger backend. [spec] is a `flexi_logger` level
/// specification such as `"info"` or `"cnhist=debug"`.
pub fn init(spec: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(spec)?.start()
}
