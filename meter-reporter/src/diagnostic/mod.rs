// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod codec;
mod correlator;
mod exception_info;
mod payload;
#[cfg(test)]
pub(crate) mod test_utils;

pub use codec::*;
pub use correlator::*;
pub use exception_info::*;
pub use payload::*;
