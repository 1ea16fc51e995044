// Copyright 2025 the CubeViz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data transforms shared by the chart-state derivations.
//!
//! This crate provides:
//! - stable multi-key sorting of categorical values ([`CategorySorter`]),
//! - long-to-wide pivots with gap imputation ([`pivot_wide`], [`WideFrame`]),
//! - stack layouts with ordering and offset modes ([`stack`]), and
//! - grouping reindexed against a full axis domain ([`group_by_key`]).
//!
//! Everything here is pure: inputs are borrowed, outputs are freshly allocated.

#![no_std]

extern crate alloc;

mod group;
mod pivot;
mod sort;
mod stack;

pub use group::{Group, group_by_key, percent_of, sums_by_key};
pub use pivot::{LongRow, WideFrame, pivot_wide};
pub use sort::{
    CategorySorter, SortContext, SortKey, natural_cmp, present_in_order, sorting_keys,
    unique_in_order,
};
pub use stack::{StackOffset, StackOrder, StackPoint, StackSeries, stack, stack_extent, stack_order};
