//! Helper macro for declaring port error enums.
//!
//! `define_port_error!` expands a compact variant table into a `thiserror`
//! enum, one snake_case constructor per variant (string-like fields accept
//! `impl Into<_>`), and a `kind()` accessor used as a structured log field.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = "Construct the `" $variant "` variant."]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            #[doc = "Construct the `" $variant "` variant."]
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Stable snake_case name of the variant, for log fields.
            pub fn kind(&self) -> &'static str {
                ::paste::paste! {
                    match self {
                        $( Self::$variant { .. } => stringify!([<$variant:snake>]), )*
                    }
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Constructor and kind coverage for generated port errors.
    define_port_error! {
        pub enum SamplePortError {
            Unavailable => "backend unavailable",
            Rejected { message: String } => "rejected: {message}",
            Exhausted { attempts: u32 } => "gave up after {attempts} attempts",
            RowConflict { table: String, attempts: u32 } => "{table} conflict ({attempts})",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        let err = SamplePortError::unavailable();
        assert_eq!(err.to_string(), "backend unavailable");
        assert_eq!(err.kind(), "unavailable");
    }

    #[test]
    fn string_fields_accept_str() {
        let err = SamplePortError::rejected("bad key");
        assert_eq!(err.to_string(), "rejected: bad key");
        assert_eq!(err.kind(), "rejected");
    }

    #[test]
    fn numeric_fields_keep_their_type() {
        let err = SamplePortError::exhausted(3_u32);
        assert_eq!(err.to_string(), "gave up after 3 attempts");
    }

    #[test]
    fn multi_word_variants_are_snake_cased() {
        let err = SamplePortError::row_conflict("tickets", 2_u32);
        assert_eq!(err.to_string(), "tickets conflict (2)");
        assert_eq!(err.kind(), "row_conflict");
    }
}
