// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Code generation backends.
//!
//! Go is the only target. Each class compiles to one self-contained Go
//! source file, either a standalone program or a cgo plugin.

pub mod go;
