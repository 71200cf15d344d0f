use std::path::Path;

use anyhow::Result;

use parsers_lib::platform::Platform;
use parsers_lib::tool::{Toolchain, WasmSupport};

use crate::output::print_stat;

fn describe(tool: Option<&Path>) -> String {
  match tool {
    Some(path) => path.display().to_string(),
    None => "not found".to_string(),
  }
}

pub fn cmd_info() -> Result<()> {
  let platform = Platform::current()?;
  let toolchain = Toolchain::detect();

  println!("System:");
  print_stat("Platform", &platform.label());
  print_stat("Library", &platform.library_file_name());

  println!("Tools:");
  print_stat("tree-sitter", &describe(toolchain.generator.as_deref()));
  print_stat("npm", &describe(toolchain.npm.as_deref()));
  print_stat("emcc", &describe(toolchain.emcc.as_deref()));
  print_stat("container", &describe(toolchain.container_runtime.as_deref()));

  let wasm = match toolchain.wasm_support(platform.os) {
    WasmSupport::Emscripten => "emscripten",
    WasmSupport::Container => "container",
    WasmSupport::Unavailable => "unavailable",
  };
  print_stat("wasm", wasm);

  Ok(())
}
