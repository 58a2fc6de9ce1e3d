// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-process recording of the panic that ends a run, so that the crash
//! diagnostic delivered on the next launch can be annotated with it.

mod exception_recorder;

pub use exception_recorder::*;
