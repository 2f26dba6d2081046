//! `log` backend that prints into the Godot console.

use godot::prelude::*;
use log::{Level, LevelFilter, Log, Metadata, Record};

struct GodotLogger;

static LOGGER: GodotLogger = GodotLogger;

impl Log for GodotLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => godot_error!("{}", record.args()),
            Level::Warn => godot_warn!("{}", record.args()),
            _ => godot_print!("{}", record.args()),
        }
    }

    fn flush(&self) {}
}

/// Route the `log` macros to Godot. Safe to call more than once
pub fn install() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
