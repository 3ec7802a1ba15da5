use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=WEBUI_LIB_DIR");
    println!("cargo:rerun-if-env-changed=WEBUI_STATIC");

    // Release archives ship both `webui-2` (shared) and `webui-2-static`.
    if let Ok(dir) = env::var("WEBUI_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }

    let static_link = matches!(
        env::var("WEBUI_STATIC").as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    );

    if !static_link {
        println!("cargo:rustc-link-lib=dylib=webui-2");
        return;
    }

    println!("cargo:rustc-link-lib=static=webui-2-static");

    // The static archive leaves its system dependencies to the final link.
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    match target_os.as_str() {
        "windows" => {
            for lib in ["ws2_32", "ole32", "advapi32", "shell32", "user32"] {
                println!("cargo:rustc-link-lib=dylib={}", lib);
            }
        }
        "macos" => {
            println!("cargo:rustc-link-lib=framework=Cocoa");
            println!("cargo:rustc-link-lib=framework=WebKit");
        }
        _ => {
            println!("cargo:rustc-link-lib=dylib=pthread");
            println!("cargo:rustc-link-lib=dylib=dl");
        }
    }
}
