use std::fmt::Debug;

use soudan_infra::SoudanContext;
use tracing::debug;

/// A single application operation: inputs gathered at the HTTP or job
/// boundary, one `execute` against the context. I/O happens only through
/// the context; the current instant is read once and passed down so the
/// compute stays deterministic.
#[async_trait::async_trait]
pub trait UseCase: Debug + Send {
    type Response: Send;
    type Error: Send;

    /// UseCase name identifier
    const NAME: &'static str;

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error>;
}

#[tracing::instrument(name = "UseCase executed", skip(usecase, ctx), fields(usecase = %U::NAME))]
pub async fn execute<U>(mut usecase: U, ctx: &SoudanContext) -> Result<U::Response, U::Error>
where
    U: UseCase,
    U::Error: Debug,
{
    debug!("{:?}", usecase);
    let res = usecase.execute(ctx).await;

    if let Err(e) = &res {
        // The error is usually already logged deeper in the stack
        debug!("Error: {:?}", e);
    }

    res
}
