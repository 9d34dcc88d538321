//! BindingResolver port - パラメータの動的上書き
//!
//! デザイナーがどう値を作るかは外部の責務。コアは
//! 「この invocation でのパラメータ X の現在値」を聞くだけです。

use crate::domain::invocation::Invocation;
use crate::domain::params::ParamValue;

pub trait BindingResolver: Send + Sync {
    /// `None` means "use the static value".
    fn resolve(&self, parameter: &str, invocation: &Invocation) -> Option<ParamValue>;
}

impl<F> BindingResolver for F
where
    F: Fn(&str, &Invocation) -> Option<ParamValue> + Send + Sync,
{
    fn resolve(&self, parameter: &str, invocation: &Invocation) -> Option<ParamValue> {
        self(parameter, invocation)
    }
}
