/// Builds a `Vec<Attr>` from `key => value` pairs.
///
/// Each value goes through [`Value::from_any`](crate::Value::from_any), so
/// integers, strings, durations and times get their dedicated kinds and
/// anything else serializable becomes an `Any` payload. A nested `{ ... }`
/// block builds a group.
///
/// # Examples
///
/// ```rust
/// use jsonslog::{attrs, Kind};
///
/// let attrs = attrs! {
///     "count" => 23,
///     "name" => "widget",
///     "request" => {
///         "method" => "GET",
///     },
/// };
/// assert_eq!(attrs.len(), 3);
/// assert_eq!(attrs[0].value.kind(), Kind::Int64);
/// assert_eq!(attrs[2].value.kind(), Kind::Group);
/// ```
#[macro_export]
macro_rules! attrs {
    (@munch $out:ident;) => {};

    // Nested group
    (@munch $out:ident; $key:expr => { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $out.push($crate::Attr::group($key, $crate::attrs!($($inner)*)));
        $crate::attrs!(@munch $out; $($($rest)*)?);
    };

    (@munch $out:ident; $key:expr => $value:expr $(, $($rest:tt)*)?) => {
        $out.push($crate::Attr::any($key, $value));
        $crate::attrs!(@munch $out; $($($rest)*)?);
    };

    // Handle empty list
    () => {
        ::std::vec::Vec::<$crate::Attr>::new()
    };

    ($($tt:tt)+) => {{
        let mut attrs = ::std::vec::Vec::<$crate::Attr>::new();
        $crate::attrs!(@munch attrs; $($tt)+);
        attrs
    }};
}
