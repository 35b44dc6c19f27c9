//! C identifiers for generated functions and variables.
//!
//! Ruby method names may contain operator characters and `?`/`!`/`=`, so
//! every source name embedded in a C identifier is mangled: ASCII letters and
//! digits are kept, `_` becomes `__`, and any other byte becomes `_XX` with
//! `XX` its uppercase hex value. The encoding is injective, so distinct
//! methods never share a function name.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::hir::Owner;

static C_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex should compile"));

/// Mangle a source name for use inside a C identifier.
pub fn mangle(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => out.push(byte as char),
            b'_' => out.push_str("__"),
            other => out.push_str(&format!("_{:02X}", other)),
        }
    }
    out
}

/// C name of a local or parameter. Plain identifiers keep their spelling
/// behind a prefix that no generated function uses; compiler temporaries
/// are mangled behind a second one.
pub fn local_name(name: &str) -> String {
    if C_IDENT.is_match(name) {
        format!("v_{}", name)
    } else {
        format!("t_{}", mangle(name))
    }
}

/// Compiled body of a method.
pub fn method_fn(owner: &Owner, name: &str, arity: usize) -> String {
    match owner {
        Some(class) => format!("m_{}_{}_{}", mangle(class), mangle(name), arity),
        None => format!("f_{}_{}", mangle(name), arity),
    }
}

/// Compiled body of a method defined by class body `opening`. Bodies from
/// a reopening get the serial as a suffix, so each one has its own function.
pub fn body_fn(owner: &Owner, name: &str, arity: usize, opening: Option<usize>) -> String {
    match opening {
        Some(serial) if serial > 0 => format!("{}_r{}", method_fn(owner, name, arity), serial),
        _ => method_fn(owner, name, arity),
    }
}

pub fn class_ptr(class: &str) -> String {
    format!("class_{}", mangle(class))
}

pub fn class_init_fn(class: &str, serial: usize) -> String {
    format!("init_class_{}_{}", mangle(class), serial)
}

pub fn define_class_fn(class: &str, serial: usize) -> String {
    format!("define_class_{}_{}", mangle(class), serial)
}

pub fn mux_fn(name: &str, argc: usize) -> String {
    format!("mux_{}_{}", mangle(name), argc)
}

pub fn constructor_fn(argc: usize) -> String {
    format!("new_{}", argc)
}

/// Runtime-callable thunk for a compiled method.
pub fn glue_fn(function: &str) -> String {
    format!("glue_{}", function)
}

/// `"..."` C string literal for arbitrary text. Bytes outside printable
/// ASCII are written as three-digit octal escapes.
pub fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for byte in text.bytes() {
        match byte {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            b'?' => out.push_str("\\?"),
            0x20..=0x7e => out.push(byte as char),
            other => out.push_str(&format!("\\{:03o}", other)),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangle() {
        assert_eq!(mangle("foo"), "foo");
        assert_eq!(mangle("foo_bar"), "foo__bar");
        assert_eq!(mangle("empty?"), "empty_3F");
        assert_eq!(mangle("+"), "_2B");
        assert_eq!(mangle("[]="), "_5B_5D_3D");
        assert_ne!(mangle("a_2B"), mangle("a+"));
    }

    #[test]
    fn test_function_names() {
        assert_eq!(method_fn(&Some("A".into()), "foo", 0), "m_A_foo_0");
        assert_eq!(method_fn(&None, "fib", 1), "f_fib_1");
        assert_eq!(method_fn(&Some("A".into()), "x=", 1), "m_A_x_3D_1");
        assert_eq!(body_fn(&Some("A".into()), "foo", 0, Some(0)), "m_A_foo_0");
        assert_eq!(body_fn(&Some("A".into()), "foo", 0, Some(2)), "m_A_foo_0_r2");
        assert_eq!(body_fn(&None, "fib", 1, None), "f_fib_1");
        assert_eq!(mux_fn("<=", 1), "mux__3C_3D_1");
        assert_eq!(class_init_fn("A", 2), "init_class_A_2");
        assert_eq!(constructor_fn(0), "new_0");
    }

    #[test]
    fn test_local_names() {
        assert_eq!(local_name("x"), "v_x");
        assert_eq!(local_name("int"), "v_int");
        assert_eq!(local_name("cond#3"), "t_cond_233");
    }

    #[test]
    fn test_c_string() {
        assert_eq!(c_string("hi\n"), "\"hi\\n\"");
        assert_eq!(c_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(c_string("é"), "\"\\303\\251\"");
        assert_eq!(c_string("??="), "\"\\?\\?=\"");
    }
}
