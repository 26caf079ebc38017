use std::time::Duration;

use crate::data_types::retry::RetryPolicy;

/// Fixed pause before the single retry of a build or pull
pub const PROVISION_BACKOFF: Duration = Duration::from_secs(5);

/// Which pipeline image we need
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum ImageFamily {
    #[strum(serialize = "DeepVariant")]
    DeepVariant,
    #[strum(serialize = "DeepTrio")]
    DeepTrio
}

impl ImageFamily {
    /// Published repository for pre-built images
    pub fn remote_repository(&self) -> &'static str {
        "google/deepvariant"
    }

    /// Versioned remote tag, e.g. `1.5.0-gpu` or `deeptrio-1.5.0`
    pub fn remote_tag(&self, version: &str, use_gpu: bool) -> String {
        let prefix = match self {
            ImageFamily::DeepVariant => "",
            ImageFamily::DeepTrio => "deeptrio-"
        };
        let suffix = if use_gpu { "-gpu" } else { "" };
        format!("{prefix}{version}{suffix}")
    }

    /// Tag applied to locally built images
    pub fn local_name(&self, use_gpu: bool) -> &'static str {
        match (self, use_gpu) {
            (ImageFamily::DeepVariant, false) => "deepvariant",
            (ImageFamily::DeepVariant, true) => "deepvariant_gpu",
            (ImageFamily::DeepTrio, false) => "deeptrio",
            (ImageFamily::DeepTrio, true) => "deeptrio_gpu"
        }
    }

    pub fn dockerfile(&self) -> &'static str {
        match self {
            ImageFamily::DeepVariant => "Dockerfile",
            ImageFamily::DeepTrio => "Dockerfile.deeptrio"
        }
    }
}

/// A resolved container image tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn new(tag: impl Into<String>) -> Self {
        ImageReference(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an image gets onto the host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvisionAction {
    /// `docker build` from the checked out source tree
    Build {
        dockerfile: &'static str,
        build_args: Vec<String>
    },
    /// `docker pull` from the registry
    Pull
}

/// One of the four build/pull x GPU/CPU branches, with its retry policy attached
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionPlan {
    pub image: ImageReference,
    pub action: ProvisionAction,
    pub retry: RetryPolicy
}

impl ProvisionPlan {
    /// Plan for pulling a third party image exactly once
    pub fn pull_once(image: &str) -> Self {
        ProvisionPlan {
            image: ImageReference::new(image),
            action: ProvisionAction::Pull,
            retry: RetryPolicy::no_retry()
        }
    }
}

/// Selects the provisioning branch. Pure over (family, docker_build, use_gpu, version).
/// Note that the GPU build is deliberately attempted only once, while every other branch gets one retry.
pub fn plan_image(family: ImageFamily, docker_build: bool, use_gpu: bool, version: &str) -> ProvisionPlan {
    match (docker_build, use_gpu) {
        (true, true) => ProvisionPlan {
            image: ImageReference::new(format!("{}:latest", family.local_name(true))),
            action: ProvisionAction::Build {
                dockerfile: family.dockerfile(),
                build_args: vec![
                    "--build-arg=FROM_IMAGE=nvidia/cuda:11.3.1-cudnn8-devel-ubuntu20.04".to_string(),
                    "--build-arg=DV_GPU_BUILD=1".to_string()
                ]
            },
            retry: RetryPolicy::no_retry()
        },
        (true, false) => ProvisionPlan {
            image: ImageReference::new(format!("{}:latest", family.local_name(false))),
            action: ProvisionAction::Build {
                dockerfile: family.dockerfile(),
                build_args: vec!["--build-arg=DV_OPENVINO_BUILD=1".to_string()]
            },
            retry: RetryPolicy::retry_once(PROVISION_BACKOFF)
        },
        (false, gpu) => ProvisionPlan {
            image: ImageReference::new(format!("{}:{}", family.remote_repository(), family.remote_tag(version, gpu))),
            action: ProvisionAction::Pull,
            retry: RetryPolicy::retry_once(PROVISION_BACKOFF)
        }
    }
}
