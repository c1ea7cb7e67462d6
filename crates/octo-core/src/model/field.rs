use std::fmt::Debug;
use std::hash::Hash;

/// A statically declared column of an entity
///
/// Each entity declares two field enums: its key fields (usable in filters)
/// and its attribute fields (usable in changes). Because changes are typed by
/// the attribute enum, an option naming a field the entity does not have is
/// a compile error rather than a runtime `respond_to` check.
pub trait Field: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every variant, in column order
    const ALL: &'static [Self];

    /// Column name in the relational store and in cache keys
    fn column(self) -> &'static str;

    /// Decimal places used when comparing old and new values for dirtiness.
    ///
    /// `None` means exact equality.
    fn precision(self) -> Option<u32> {
        None
    }
}

/// Declare a field enum and its `Field` implementation
///
/// ```
/// octo_core::entity_fields! {
///     pub enum ItemAttr {
///         Title => "title",
///         Price => "price" (round 2),
///     }
/// }
///
/// use octo_core::model::Field;
/// assert_eq!(ItemAttr::Price.column(), "price");
/// assert_eq!(ItemAttr::Price.precision(), Some(2));
/// assert_eq!(ItemAttr::Title.precision(), None);
/// assert_eq!(ItemAttr::ALL.len(), 2);
/// ```
#[macro_export]
macro_rules! entity_fields {
    (@precision) => {
        None
    };
    (@precision $places:literal) => {
        Some($places)
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $column:literal $((round $places:literal))?),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::model::Field for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn column(self) -> &'static str {
                match self {
                    $($name::$variant => $column),+
                }
            }

            fn precision(self) -> Option<u32> {
                match self {
                    $($name::$variant => $crate::entity_fields!(@precision $($places)?)),+
                }
            }
        }
    };
}

/// Compare two numbers after rounding both to `places` decimals
///
/// Rounding starts from the exact decimal expansion of each float, so
/// `19.995` (stored as `19.99499999...`) rounds to `19.99`. Scaling by a
/// power of ten first would round the product `1999.5` up instead.
pub fn rounded_eq(a: f64, b: f64, places: u32) -> bool {
    round_decimal(a, places) == round_decimal(b, places)
}

fn round_decimal(value: f64, places: u32) -> Option<f64> {
    format!("{:.*}", places as usize, value).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_eq_price_cases() {
        assert!(rounded_eq(19.995, 19.99, 2));
        assert!(!rounded_eq(19.90, 19.99, 2));
        assert!(rounded_eq(0.1 + 0.2, 0.3, 2));
    }

    #[test]
    fn test_rounded_eq_uses_exact_decimal_value() {
        // 19.995 * 100.0 is exactly 1999.5 in binary
        assert_eq!(19.995 * 100.0, 1999.5);
        assert!(rounded_eq(19.995, 19.99, 2));
        assert!(!rounded_eq(19.995, 20.0, 2));
        assert!(rounded_eq(-0.001, 0.0, 2));
        assert!(rounded_eq(2.675, 2.67, 2));
        assert!(!rounded_eq(f64::NAN, f64::NAN, 2));
    }
}
