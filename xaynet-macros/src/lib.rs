//! The `metrics!` call-site helper used throughout `xaynet-server`.
//!
//! Metrics emission is feature-gated (`xaynet-server`'s `metrics` feature) and has nothing to do
//! with the coordinator core itself, but the phase machine still wants a single,
//! uniform way to say "emit this event if metrics are enabled" without every call site growing
//! its own `#[cfg(feature = "metrics")]` block. `metrics!(sender_expr, event_expr)` expands to
//! exactly that block, so with the feature off the whole statement - `sender_expr` included - is
//! stripped before type-checking and the `metrics_tx` field it refers to need not even exist.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, parse_macro_input, Expr, Token};

struct MetricsCall {
    sender: Expr,
    event: Expr,
}

impl Parse for MetricsCall {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let sender: Expr = input.parse()?;
        input.parse::<Token![,]>()?;
        let event: Expr = input.parse()?;
        Ok(MetricsCall { sender, event })
    }
}

/// `metrics!(metrics_tx_expr, event_expr)` — sends `event_expr` down `metrics_tx_expr` (an
/// `Option<UnboundedSender<Metric>>`) if the `metrics` feature is compiled in, and compiles to
/// nothing at all otherwise.
#[proc_macro]
pub fn metrics(input: TokenStream) -> TokenStream {
    let MetricsCall { sender, event } = parse_macro_input!(input as MetricsCall);
    let expanded = quote! {
        #[cfg(feature = "metrics")]
        {
            if let Some(ref __metrics_tx) = #sender {
                let _ = __metrics_tx.send(#event);
            }
        }
    };
    expanded.into()
}
