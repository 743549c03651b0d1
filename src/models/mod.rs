// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: tracks and the projects that hold them.

pub mod project;
pub mod track;
