use num_complex::Complex64;
use pretty_dtoa::{dtoa, FmtFloatConfig};

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(9);

fn fmt_f64(f: f64) -> String {
    dtoa(f, FLOAT_CONFIG)
}

fn format_vec<T>(v: &[T], f: impl Fn(&T) -> String) -> String {
    let a: Vec<String> = v.iter().map(f).collect();
    format!("[{}]", a.join(", "))
}

pub fn format_f64_vec(v: &[f64]) -> String {
    format_vec(v, |&f| fmt_f64(f))
}

/// Formats complex values as `a+jb`.
pub fn format_rect_vec(v: &[Complex64]) -> String {
    format_vec(v, |z| {
        format!(
            "{}{}j{}",
            fmt_f64(z.re),
            if z.im.is_sign_negative() { "-" } else { "+" },
            fmt_f64(z.im.abs())
        )
    })
}

/// Formats complex values as magnitude and angle in degrees.
pub fn format_polar_vec(v: &[Complex64]) -> String {
    format_vec(v, |z| {
        format!("{}\u{2220}{}\u{00B0}", fmt_f64(z.norm()), fmt_f64(z.arg().to_degrees()))
    })
}
