// Copyright 2026 The Shopclerk Project
// SPDX-License-Identifier: Apache-2.0

pub mod articles;
pub mod auth;
pub mod client;
pub mod config;
pub mod format;
pub mod render;
pub mod session;
pub mod stream;
pub mod widget;
