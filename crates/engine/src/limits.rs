/// Resource limits applied while parsing untrusted submissions.
///
/// Submissions are attacker-controlled text. The limits below bound the
/// memory and stack cost of a single parse; exceeding one never aborts the
/// run. Over-budget elements are clipped out of the tree and counted in
/// [`crate::metrics::DocumentMetrics`], oversized attribute values are
/// truncated, and oversized CSS is cut at the byte budget.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Maximum number of DOM nodes built for one document
    pub max_nodes: usize,
    /// Maximum element nesting depth
    pub max_depth: usize,
    /// Maximum length of a single attribute value in bytes
    pub max_attr_length: usize,
    /// Maximum total CSS size in bytes
    pub max_css_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_nodes: 50_000,
            max_depth: 256,
            max_attr_length: 4096,
            max_css_bytes: 512 * 1024, // 512KB CSS limit by default
        }
    }
}

impl ResourceLimits {
    /// Truncate an attribute value to the configured budget.
    pub fn clamp_attr(&self, value: &str) -> String {
        if value.len() <= self.max_attr_length {
            return value.to_string();
        }
        // Cut on a char boundary
        let mut end = self.max_attr_length;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        value[..end].to_string()
    }

    /// Truncate a CSS source to the configured byte budget.
    pub fn clamp_css(&self, css: &str) -> String {
        if css.len() <= self.max_css_bytes {
            return css.to_string();
        }
        let mut end = self.max_css_bytes;
        while !css.is_char_boundary(end) {
            end -= 1;
        }
        css[..end].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.max_nodes, 50_000);
        assert_eq!(limits.max_depth, 256);
        assert_eq!(limits.max_attr_length, 4096);
        assert_eq!(limits.max_css_bytes, 512 * 1024);
    }

    #[test]
    fn test_clamp_attr_truncates_on_char_boundary() {
        let limits = ResourceLimits {
            max_attr_length: 4,
            ..Default::default()
        };
        assert_eq!(limits.clamp_attr("abcdef"), "abcd");
        // 'é' is two bytes; cutting inside it must back off to a boundary
        assert_eq!(limits.clamp_attr("abécd"), "ab");
        assert_eq!(limits.clamp_attr("ok"), "ok");
    }

    #[test]
    fn test_clamp_css() {
        let limits = ResourceLimits {
            max_css_bytes: 10,
            ..Default::default()
        };
        let css = "body { color: red; }";
        assert_eq!(limits.clamp_css(css).len(), 10);
    }
}
