//! Pyramid requests loaded from YAML files.
//!
//! ```yaml
//! identifier: world
//! crs: EPSG:4326
//! lower: [-180, -90]
//! upper: [180, 90]
//! resolution: [0.25, 0.25]
//! tile_size: [256, 256]
//! iteration: top-to-bottom-last-exact
//! ```
//!
//! Values may reference environment variables using `${VAR}` or
//! `${VAR:-default}`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tile_matrix::{BuilderConfig, IterationPolicy, TileMatrixSetBuilder};
use tms_common::{Crs, Envelope};

/// One pyramid to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidRequest {
    #[serde(default = "default_identifier")]
    pub identifier: String,
    pub crs: String,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Native resolution per axis.
    pub resolution: Vec<f64>,
    #[serde(default)]
    pub tile_size: Option<Vec<u32>>,
    #[serde(default)]
    pub scale_factor: Option<f64>,
    #[serde(default)]
    pub scales: Option<Vec<f64>>,
    #[serde(default)]
    pub iteration: Option<IterationPolicy>,
    #[serde(default)]
    pub nb_tile_threshold: Option<u64>,
    #[serde(default)]
    pub axes: Option<Vec<usize>>,
}

fn default_identifier() -> String {
    "default".to_string()
}

impl PyramidRequest {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let request: Self =
            serde_yaml::from_str(&expanded).context("Failed to parse pyramid request")?;
        request.validate()?;
        Ok(request)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid request file: {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.identifier.is_empty(), "identifier cannot be empty");
        anyhow::ensure!(
            self.lower.len() == self.upper.len(),
            "lower has {} values but upper has {}",
            self.lower.len(),
            self.upper.len()
        );
        anyhow::ensure!(
            self.resolution.len() == self.lower.len(),
            "resolution must have one value per axis ({}), got {}",
            self.lower.len(),
            self.resolution.len()
        );
        Ok(())
    }

    pub fn envelope(&self) -> Result<Envelope> {
        let crs = Crs::parse(&self.crs).with_context(|| format!("Unsupported CRS: {}", self.crs))?;
        Envelope::new(self.lower.clone(), self.upper.clone(), crs)
            .context("Invalid request envelope")
    }

    /// A builder configured from `config`, with request values taking precedence.
    pub fn to_builder(&self, config: &BuilderConfig) -> Result<TileMatrixSetBuilder> {
        let mut builder = TileMatrixSetBuilder::with_config(config)
            .identifier(self.identifier.clone())
            .domain_envelope(self.envelope()?, self.resolution.clone());

        if let Some(tile_size) = &self.tile_size {
            builder = builder.tile_size(tile_size.clone());
        }
        if let Some(factor) = self.scale_factor {
            builder = builder.scale_factor(factor);
        }
        if let Some(scales) = &self.scales {
            builder = builder.scales(scales.clone());
        }
        if let Some(policy) = self.iteration {
            builder = builder.iteration(policy);
        }
        if let Some(threshold) = self.nb_tile_threshold {
            builder = builder.nb_tile_threshold(threshold);
        }
        if let Some(axes) = &self.axes {
            builder = builder.axes(axes.iter().copied());
        }
        Ok(builder)
    }
}

/// Expand environment variables in YAML content.
/// Supports ${VAR} and ${VAR:-default} syntax.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORLD: &str = r#"
identifier: world
crs: EPSG:4326
lower: [-180, -90]
upper: [180, 90]
resolution: [1.0, 1.0]
tile_size: [128, 128]
iteration: top-to-bottom-last-exact
"#;

    #[test]
    fn test_parse_request() {
        let request = PyramidRequest::from_yaml(WORLD).unwrap();
        assert_eq!(request.identifier, "world");
        assert_eq!(request.iteration, Some(IterationPolicy::TopToBottomLastExact));
        assert!(request.scales.is_none());
    }

    #[test]
    fn test_request_builds_pyramid() {
        let request = PyramidRequest::from_yaml(WORLD).unwrap();
        let set = request
            .to_builder(&BuilderConfig::default())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(set.identifier(), "world");
        assert_eq!(set.scales(), vec![1.0, 1.40625]);
    }

    #[test]
    fn test_mismatched_axes_rejected() {
        let yaml = "crs: EPSG:4326\nlower: [0, 0]\nupper: [1, 1]\nresolution: [0.1]\n";
        assert!(PyramidRequest::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_crs() {
        let yaml = "crs: FOO:1\nlower: [0, 0]\nupper: [1, 1]\nresolution: [0.1, 0.1]\n";
        let request = PyramidRequest::from_yaml(yaml).unwrap();
        assert!(request.envelope().is_err());
    }

    #[test]
    fn test_env_default_expansion() {
        let yaml = "crs: ${PYRAMID_TEST_UNSET_CRS:-EPSG:3857}\nlower: [0, 0]\nupper: [10, 10]\nresolution: [1, 1]\n";
        let request = PyramidRequest::from_yaml(yaml).unwrap();
        assert_eq!(request.crs, "EPSG:3857");
    }

    #[test]
    fn test_unclosed_variable() {
        assert!(expand_env_vars("crs: ${OOPS").is_err());
    }
}
