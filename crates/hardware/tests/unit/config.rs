//! # Configuration Tests
//!
//! Loading configurations from disk, defaults and validation.

use std::io::Write;

use o3sim_core::common::{RegClass, SimError, VecMode};
use o3sim_core::config::{Config, MemoryMode};
use pretty_assertions::assert_eq;

fn load(text: &str) -> Config {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let contents = std::fs::read_to_string(file.path()).unwrap();
    Config::from_json(&contents).unwrap()
}

#[test]
fn test_load_from_file() {
    let config = load(
        r#"{
            "general": { "memory_mode": "Atomic", "clock_period": 1000 },
            "cpu": { "num_threads": 2, "rob_entries": 32 },
            "isa": { "initial_vec_mode": "Elem", "int_zero_reg": null },
            "ruby": { "block_size_bytes": 128 }
        }"#,
    );
    assert_eq!(config.general.memory_mode, MemoryMode::Atomic);
    assert_eq!(config.general.clock_period, 1000);
    assert_eq!(config.cpu.num_threads, 2);
    assert_eq!(config.cpu.rob_entries, 32);
    assert_eq!(config.isa.initial_vec_mode, VecMode::Elem);
    assert_eq!(config.isa.int_zero_reg, None);
    assert_eq!(config.ruby.block_size_bytes, 128);
    assert_eq!(config.ruby.block_size_bits(), 7);
}

#[test]
fn test_empty_file_uses_defaults() {
    let config = load("{}");
    assert_eq!(config.cpu.num_threads, 1);
    assert_eq!(config.isa.int_zero_reg, Some(0));
    assert_eq!(config.ruby.line_address(0x1234), 0x1200);
}

#[test]
fn test_malformed_json() {
    assert!(matches!(
        Config::from_json("{ \"cpu\": 3 }"),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn test_zero_widths_default_to_one() {
    let mut config = Config::default();
    config.cpu.fetch_width = 0;
    config.cpu.num_dcache_ports = 0;
    config.validate().unwrap();
    assert_eq!(config.cpu.fetch_width, 1);
    assert_eq!(config.cpu.num_dcache_ports, 1);
}

#[test]
fn test_register_file_sizing() {
    let mut config = Config::default();
    config.cpu.num_threads = 2;
    config.cpu.num_phys_int_regs = 40;
    assert_eq!(
        config.validate(),
        Err(SimError::RegisterFileTooSmall {
            class: RegClass::Int,
            have: 40,
            need: 64,
        })
    );
}

#[test]
fn test_thread_limit() {
    let mut config = Config::default();
    config.cpu.num_threads = 9;
    assert!(matches!(
        config.validate(),
        Err(SimError::TooManyThreads { requested: 9, .. })
    ));
}

#[test]
fn test_block_size_power_of_two() {
    let mut config = Config::default();
    config.ruby.block_size_bytes = 96;
    assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
}
