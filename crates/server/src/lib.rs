pub mod error;
pub mod extract;
pub mod http;
pub mod middleware;
pub mod routes;

pub type DeploymentImpl = local_deployment::LocalDeployment;
