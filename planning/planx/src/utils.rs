use std::fmt::{Display, Error, Formatter};

/// Writes all elements of `iterable`, separated by `sep`.
pub fn disp_iter<T: Display>(f: &mut Formatter<'_>, iterable: impl IntoIterator<Item = T>, sep: &str) -> Result<(), Error> {
    for (i, elem) in iterable.into_iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{elem}")?;
    }
    Ok(())
}

/// Writes a parenthesized s-expression `(head e1 e2 ...)`.
pub fn disp_application<T: Display>(
    f: &mut Formatter<'_>,
    head: impl Display,
    args: impl IntoIterator<Item = T>,
) -> Result<(), Error> {
    write!(f, "({head}")?;
    for arg in args {
        write!(f, " {arg}")?;
    }
    write!(f, ")")
}
