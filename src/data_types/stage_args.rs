use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::str::FromStr;

/// Options forwarded to a single stage of the external pipeline.
/// Kept as an ordered map internally and only rendered to the `k=v,k=v` form when the invocation is assembled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StageArgs {
    options: IndexMap<String, String>
}

impl StageArgs {
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|v| v.as_str())
    }

    /// Renders into the comma-separated form the pipeline expects, preserving insertion order
    pub fn to_flag_value(&self) -> String {
        self.options.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .join(",")
    }
}

impl FromStr for StageArgs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut options = IndexMap::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (key, value) = entry.split_once('=')
                .ok_or_else(|| format!("expected key=value, found {entry:?}"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("missing option name in {entry:?}"));
            }
            if options.insert(key.to_string(), value.trim().to_string()).is_some() {
                return Err(format!("option {key:?} given more than once"));
            }
        }
        Ok(StageArgs { options })
    }
}

/// Value parser used by the CLI for the `*_extra_args` flags
pub fn parse_stage_args(value: &str) -> Result<StageArgs, String> {
    value.parse()
}

/// Ordered flag/value pairs appended verbatim to the pipeline command line.
/// Some stages are positionally sensitive, so the order of `push` is the order on the command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtraArgsList {
    pairs: Vec<(String, String)>
}

impl ExtraArgsList {
    pub fn push(&mut self, flag: &str, value: impl Into<String>) {
        self.pairs.push((flag.to_string(), value.into()));
    }

    /// Adds the stage arguments only if something was provided
    pub fn push_stage(&mut self, flag: &str, args: &StageArgs) {
        if !args.is_empty() {
            self.push(flag, args.to_flag_value());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn flags(&self) -> Vec<&str> {
        self.pairs.iter().map(|(f, _v)| f.as_str()).collect()
    }

    /// Flattens into argument tokens, flag followed by its value
    pub fn to_args(&self) -> Vec<String> {
        self.pairs.iter()
            .flat_map(|(f, v)| [f.clone(), v.clone()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stage_args() {
        let args: StageArgs = "vsc_min_fraction_indels=0.12, keep_supplementary_alignments=true".parse().unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args.get("vsc_min_fraction_indels"), Some("0.12"));
        assert_eq!(args.to_flag_value(), "vsc_min_fraction_indels=0.12,keep_supplementary_alignments=true");

        // empty is allowed and means "nothing to forward"
        let args: StageArgs = "".parse().unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_parse_stage_args_errors() {
        assert!("novalue".parse::<StageArgs>().is_err());
        assert!("=1".parse::<StageArgs>().is_err());
        assert!("a=1,a=2".parse::<StageArgs>().is_err());
    }

    #[test]
    fn test_extra_args_order() {
        let me: StageArgs = "a=1".parse().unwrap();
        let cv: StageArgs = "b=2".parse().unwrap();
        let empty = StageArgs::default();

        let mut extra = ExtraArgsList::default();
        extra.push_stage("--make_examples_extra_args", &me);
        extra.push_stage("--call_variants_extra_args", &empty);
        extra.push_stage("--postprocess_variants_extra_args", &cv);
        assert_eq!(extra.to_args(), vec![
            "--make_examples_extra_args", "a=1",
            "--postprocess_variants_extra_args", "b=2"
        ]);
    }
}
