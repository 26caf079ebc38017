use log::info;

use crate::data_types::image::{ImageReference, ProvisionAction, ProvisionPlan};
use crate::errors::PipelineError;
use crate::exec::{run_expecting_success, CommandRunner, Invocation};

/// The single command behind a plan
pub fn provision_invocation(plan: &ProvisionPlan) -> Invocation {
    match &plan.action {
        ProvisionAction::Build { dockerfile, build_args } => Invocation::docker()
            .arg("build")
            .arg("-f").arg(*dockerfile)
            .arg("-t").arg(plan.image.as_str())
            .args(build_args.iter().cloned())
            .arg("."),
        ProvisionAction::Pull => Invocation::docker()
            .arg("pull")
            .arg(plan.image.as_str())
    }
}

/// Builds or pulls the image, retrying as the plan allows.
/// Returns the image reference for the runner on success.
pub fn provision_image<R: CommandRunner + ?Sized>(plan: &ProvisionPlan, runner: &mut R) -> Result<ImageReference, PipelineError> {
    let verb = match plan.action {
        ProvisionAction::Build { .. } => "Building",
        ProvisionAction::Pull => "Pulling"
    };
    info!("{verb} image {}...", plan.image);
    let inv = provision_invocation(plan);

    plan.retry.execute(runner, &format!("{verb} {}", plan.image), |r| run_expecting_success(r, &inv))
        .map_err(|reason| PipelineError::ImageProvision {
            image: plan.image.to_string(),
            attempts: plan.retry.max_attempts(),
            reason
        })?;
    Ok(plan.image.clone())
}
