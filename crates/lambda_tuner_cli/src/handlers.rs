//! Session glue between configuration, the sweep engine and the exporters.

pub mod tune;
