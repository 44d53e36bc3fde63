// Copyright 2026 the Ferry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rendering strategies and per-frame plans for ferry transitions.
//!
//! This crate sits between [`ferry_core`]'s transition store and the host's
//! overlay. It defines:
//!
//! - [`FloatingContent`]: duplicate surface or live mirror of the source
//! - [`MirroringBackend`]: capability-probed mirroring, with [`NoMirroring`]
//! - [`StrategyResolver`]: per-transition strategy choice with fallback
//! - [`TransitionPlan`]: floating items, visibility items and damage for one
//!   frame, built by [`PlanBuilder`]
//! - [`DamageRegion`]: spatial damage tracking for partial re-rendering
//! - [`Presenter`]: the trait host glue implements to apply a plan
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` / `trace-rich` (disabled by default): Forward to the
//!   corresponding `ferry_core` features; `trace-rich` makes
//!   [`PlanBuilder`] emit per-item floating geometry events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod damage;
mod plan;
mod presenter;
mod resource;
mod strategy;

pub use damage::DamageRegion;
pub use plan::{FloatingItem, PlanBuilder, TransitionPlan, VisibilityItem};
pub use presenter::Presenter;
pub use resource::{SourceHandle, SurfaceId};
pub use strategy::{
    ContentRequest, FloatingContent, MirroringBackend, NoMirroring, StrategyResolver,
};
