//! Node addon exporting `hello`.

use hello_addon::HELLO;
use napi::{Env, JsObject};
use napi_derive::module_exports;

#[module_exports]
fn init(mut exports: JsObject, env: Env) -> napi::Result<()> {
    hello_addon::node::register(&env, &mut exports, &HELLO)?;
    Ok(())
}
