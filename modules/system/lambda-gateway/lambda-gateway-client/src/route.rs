use crate::error::ClientError;

/// A routing string split into the function to invoke and the path it should see.
///
/// Routing strings have the form `<function>/<path>`. The split happens at the
/// first `/`, which stays with the path. A leading `/` yields an empty function
/// identifier; that input is accepted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route<'a> {
    function: &'a str,
    path: &'a str,
}

impl<'a> Route<'a> {
    /// Split a routing string at its first `/`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidRoute`] if the string contains no `/`.
    pub fn parse(route: &'a str) -> Result<Self, ClientError> {
        let index = route
            .find('/')
            .ok_or_else(|| ClientError::InvalidRoute(format!("no path in route `{route}`")))?;
        let (function, path) = route.split_at(index);
        Ok(Self { function, path })
    }

    /// Function identifier (name, ARN or alias-qualified name).
    #[must_use]
    pub fn function(&self) -> &'a str {
        self.function
    }

    /// Logical HTTP path, always starting with `/`.
    #[must_use]
    pub fn path(&self) -> &'a str {
        self.path
    }
}
