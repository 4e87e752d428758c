//! Turning conditions into [Result]s

/// Returns `err` unless `cond` holds.
///
/// ```rust
/// # use factotum_util::result::ensure_or;
/// let want = 12usize;
/// assert!(ensure_or(want <= 4096, "message too large").is_ok());
/// assert_eq!(ensure_or(want > 64, "toosmall must grow"), Err("toosmall must grow"));
/// ```
pub fn ensure_or<E>(cond: bool, err: E) -> Result<(), E> {
    match cond {
        true => Ok(()),
        false => Err(err),
    }
}

/// Returns `err` if `cond` holds.
///
/// ```rust
/// # use factotum_util::result::bail_if;
/// let (rounds, limit) = (3usize, 3usize);
/// assert_eq!(bail_if(rounds >= limit, "too many rounds"), Err("too many rounds"));
/// assert!(bail_if(rounds > limit, "too many rounds").is_ok());
/// ```
pub fn bail_if<E>(cond: bool, err: E) -> Result<(), E> {
    ensure_or(!cond, err)
}
