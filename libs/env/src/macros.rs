//! Macros for defining the registry vocabulary.

/// Defines a closed vocabulary of environment-backed keys.
///
/// Each entry names the variant, its logical (template hole) name, the
/// canonical `OS_` variable, and any accepted aliases. Entries marked
/// `secret` are redacted from `Debug` output and CLI tables.
///
/// This generates:
/// - the enum itself with `Copy`, `Ord`, and `Hash`
/// - `ALL` listing every variant in declaration order
/// - `name()`, `env_var()`, `aliases()`, `is_secret()`
/// - `from_name()` for logical-name lookup
/// - `Display` printing the logical name
///
/// # Example
///
/// ```ignore
/// define_keys! {
///     /// Settings read from the process environment.
///     pub enum EnvKey {
///         AuthUrl => "auth_url", "OS_AUTH_URL", [];
///         Password => "password", "OS_PASSWORD", [], secret;
///     }
/// }
/// ```
#[macro_export]
macro_rules! define_keys {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $logical:literal, $var:literal, [$($alias:literal),*] $(, $secret:ident)?;
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every key in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Logical name, used as the template hole name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $logical,)+
                }
            }

            /// Canonical environment variable.
            #[must_use]
            pub const fn env_var(self) -> &'static str {
                match self {
                    $($name::$variant => $var,)+
                }
            }

            /// Alternative variables consulted when the canonical one is unset.
            #[must_use]
            pub const fn aliases(self) -> &'static [&'static str] {
                match self {
                    $($name::$variant => &[$($alias),*],)+
                }
            }

            /// Whether values for this key must not be printed.
            #[must_use]
            pub const fn is_secret(self) -> bool {
                match self {
                    $($name::$variant => $crate::define_keys!(@secret $($secret)?),)+
                }
            }

            /// Looks a key up by its logical name.
            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|key| key.name() == name)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
    (@secret secret) => { true };
    (@secret) => { false };
}
