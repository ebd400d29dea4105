//! Node addon exporting `hello1`.

use hello_addon::HELLO1;
use napi::{Env, JsObject};
use napi_derive::module_exports;

#[module_exports]
fn init(mut exports: JsObject, env: Env) -> napi::Result<()> {
    hello_addon::node::register(&env, &mut exports, &HELLO1)?;
    Ok(())
}
