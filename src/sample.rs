//! Sample suites shipped with the binary.
//!
//! Each function follows the `<suite>_<name>` convention and is registered in
//! the symbol table below, which is what suite discovery sees.

use std::time::Duration;
use testfw::{symbol_table, SymbolTable};

pub fn symbols() -> SymbolTable {
    symbol_table![
        test_success,
        test_failure,
        crash_segfault,
        crash_assert,
        slow_sleep,
        slow_quick,
        output_hello,
        output_stderr,
        misc_negret,
        misc_posret,
        misc_args,
    ]
}

/// Succeeds after printing a greeting
fn test_success(_args: &[String]) -> i32 {
    println!("hello world");
    0
}

fn test_failure(_args: &[String]) -> i32 {
    1
}

/// Writes through an unmapped address
fn crash_segfault(_args: &[String]) -> i32 {
    let invalid = 8usize as *mut i32;
    unsafe {
        std::ptr::write_volatile(invalid, 0);
    }
    0
}

fn crash_assert(_args: &[String]) -> i32 {
    let one = std::hint::black_box(1);
    assert_eq!(one, 2, "one is not two");
    0
}

/// Outlives any reasonable time limit
fn slow_sleep(_args: &[String]) -> i32 {
    std::thread::sleep(Duration::from_secs(10));
    0
}

fn slow_quick(_args: &[String]) -> i32 {
    std::thread::sleep(Duration::from_millis(100));
    0
}

fn output_hello(_args: &[String]) -> i32 {
    println!("hello world");
    0
}

fn output_stderr(_args: &[String]) -> i32 {
    eprintln!("hello stderr");
    0
}

fn misc_negret(_args: &[String]) -> i32 {
    -1
}

fn misc_posret(_args: &[String]) -> i32 {
    2
}

/// Exit code is the number of test arguments
fn misc_args(args: &[String]) -> i32 {
    for arg in args {
        println!("arg: {arg}");
    }
    args.len() as i32
}
