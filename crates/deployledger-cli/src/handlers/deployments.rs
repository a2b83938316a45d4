#![deny(clippy::all, clippy::pedantic)]

use deployledger_api_types::{
    DeploymentAccepted, DeploymentInfoRequest, DeploymentListResponse, DeploymentView,
};
use uuid::Uuid;

use crate::args::{ListArgs, PushArgs};
use crate::client::{CliError, Ctx};
use crate::io::workflow_info;
use crate::print::print_json;

pub async fn push(ctx: &Ctx, args: PushArgs) -> Result<(), CliError> {
    if args.service.trim().is_empty() {
        return Err(CliError::InvalidInput("--service must not be empty".into()));
    }
    if args.stage.trim().is_empty() {
        return Err(CliError::InvalidInput("--stage must not be empty".into()));
    }

    let body = DeploymentInfoRequest {
        stage: args.stage,
        service_name: args.service,
        tag: args.tag,
        workflow_info: workflow_info(&args.workflow, args.workflow_file.as_deref())?,
    };

    let accepted: DeploymentAccepted = ctx
        .post("deployment-info", &body, args.idempotency_key.as_deref())
        .await?;
    print_json(&accepted)
}

pub async fn show(ctx: &Ctx, id: Uuid) -> Result<(), CliError> {
    let view: DeploymentView = ctx.get(&format!("deployments/{id}"), &[]).await?;
    print_json(&view)
}

pub async fn list(ctx: &Ctx, args: ListArgs) -> Result<(), CliError> {
    let mut q = vec![("limit", args.limit.to_string())];
    if let Some(service) = args.service {
        q.push(("service", service));
    }
    if let Some(environment) = args.environment {
        q.push(("environment", environment));
    }
    if let Some(cursor) = args.cursor {
        q.push(("cursor", cursor));
    }

    let page: DeploymentListResponse = ctx.get("deployments", &q).await?;
    print_json(&page)
}
