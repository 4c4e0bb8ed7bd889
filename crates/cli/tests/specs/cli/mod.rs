// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod config;
mod delete;
mod help;
mod render;
mod submit;
mod templates;
