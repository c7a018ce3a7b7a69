//! Built-in tool tables.

use crate::schema::InputKind::{Color, Integer, Number, Path, Text};
use crate::schema::{GeneralOptions, InputKind, OptionSpec, ToolConfig};

pub const DX_LEVEL_PRESETS: &[&str] = &["50", "70", "80", "81", "90", "95", "98", "100", "110", "120"];

fn toggles(entries: &[(&str, &str)]) -> Vec<OptionSpec> {
    entries
        .iter()
        .map(|(key, description)| OptionSpec::toggle(key, description))
        .collect()
}

fn inputs(entries: &[(&str, &str, &str, InputKind)]) -> Vec<OptionSpec> {
    entries
        .iter()
        .map(|(key, description, placeholder, kind)| {
            OptionSpec::typed_input(key, description, placeholder, *kind)
        })
        .collect()
}

fn sliders(entries: &[(&str, &str, f64, f64)]) -> Vec<OptionSpec> {
    entries
        .iter()
        .map(|(key, description, min, max)| OptionSpec::slider(key, description, *min, *max))
        .collect()
}

pub fn builtin_tools() -> Vec<ToolConfig> {
    vec![wine(), mangohud(), vkbasalt(), gamemode(), gamescope(), dxvk(), proton(), mesa_overlay()]
}

fn wine() -> ToolConfig {
    ToolConfig::new("Wine", "Enable Wine environment settings")
        .with(toggles(&[
            ("WINEESYNC", "Enable eventfd-based synchronization"),
            ("WINEFSYNC", "Enable futex-based synchronization"),
            ("WINE_LARGE_ADDRESS_AWARE", "Allow 32-bit games to use more than 2 GB of memory"),
            ("WINE_FULLSCREEN_FSR", "Enable AMD FidelityFX Super Resolution in fullscreen"),
        ]))
        .with(inputs(&[
            ("WINEPREFIX", "Path to Wine prefix", "e.g., /path/to/prefix", Path),
            ("WINEARCH", "Set Wine architecture", "e.g., win64", Text),
            ("WINEDLLOVERRIDES", "Override specific DLLs", "e.g., dinput8=n,b", Text),
            ("WINEDEBUG", "Set Wine debug channels", "e.g., -all", Text),
            ("WINESERVER", "Path to wineserver binary", "e.g., /path/to/wineserver", Path),
            ("WINELOADER", "Path to Wine loader", "e.g., /path/to/wine", Path),
            ("WINEDLLPATH", "Path to DLL directory", "e.g., /path/to/dlls", Path),
        ]))
        .with(sliders(&[(
            "WINE_FULLSCREEN_FSR_STRENGTH",
            "FSR sharpening strength (0 is sharpest)",
            0.0,
            5.0,
        )]))
}

fn mangohud() -> ToolConfig {
    ToolConfig::new("MangoHud", "Enable MangoHud overlay")
        .prefix("mangohud")
        .requires("mangohud")
        .with(toggles(&[
            ("MANGOHUD", "Enable MangoHud overlay"),
            ("MANGOHUD_DLSYM", "Use dlsym to load MangoHud"),
        ]))
        .with(inputs(&[
            ("MANGOHUD_CONFIG", "Inline MangoHud configuration", "e.g., fps,gpu_temp,cpu_temp", Text),
            ("MANGOHUD_CONFIGFILE", "Path to custom MangoHud config file", "e.g., /path/to/MangoHud.conf", Path),
            ("MANGOHUD_FPS_LIMIT", "Set frame rate limit", "e.g., 60", Integer),
            ("MANGOHUD_LOG_DIR", "Directory for benchmark logs", "e.g., /path/to/logs", Path),
            ("MANGOHUD_COLOR", "Set overlay text color", "e.g., #FF0000", Color),
        ]))
        .with([OptionSpec::dropdown(
            "MANGOHUD_POSITION",
            "Position:",
            &["top-left", "top-right", "bottom-left", "bottom-right", "top-center"],
            "Position of the MangoHud overlay",
            "top-left",
        )])
}

fn vkbasalt() -> ToolConfig {
    ToolConfig::new("vkBasalt", "Enable vkBasalt post-processing")
        .requires("vkbasalt")
        .with(toggles(&[
            ("ENABLE_VKBASALT", "Enable the vkBasalt layer"),
            ("VKBASALT_CAS", "Enable contrast adaptive sharpening"),
            ("VKBASALT_FXAA", "Enable fast approximate anti-aliasing"),
            ("VKBASALT_SMAA", "Enable subpixel morphological anti-aliasing"),
            ("VKBASALT_DLS", "Enable denoised luma sharpening"),
        ]))
        .with(inputs(&[
            ("VKBASALT_CONFIG_FILE", "Path to custom vkBasalt config file", "e.g., /path/to/vkBasalt.conf", Path),
            ("VKBASALT_LUT_FILE", "Path to a color lookup table", "e.g., /path/to/lut.cube", Path),
            ("VKBASALT_LOG_LEVEL", "vkBasalt log level", "e.g., info", Text),
        ]))
        .with(sliders(&[
            ("VKBASALT_CAS_SHARPNESS", "CAS sharpness", 0.0, 1.0),
            ("VKBASALT_DLS_SHARPNESS", "DLS sharpness", 0.0, 1.0),
            ("VKBASALT_DLS_DENOISE", "DLS denoise", 0.0, 1.0),
            ("VKBASALT_FXAA_SUBPIX", "FXAA subpixel quality", 0.0, 1.0),
            ("VKBASALT_FXAA_EDGE_THRESHOLD", "FXAA edge threshold", 0.0, 0.333),
            ("VKBASALT_SMAA_THRESHOLD", "SMAA edge threshold", 0.0, 0.5),
        ]))
}

fn gamemode() -> ToolConfig {
    ToolConfig::new("GameMode", "Enable Feral GameMode optimizations")
        .prefix("gamemoderun")
        .requires("gamemoded")
        .with(toggles(&[("gamemoderun", "Run the game under GameMode")]))
}

fn gamescope() -> ToolConfig {
    ToolConfig::new("Gamescope", "Run the game inside the Gamescope micro-compositor")
        .prefix("gamescope")
        .suffix("--")
        .requires("gamescope")
        .with(toggles(&[
            ("-f", "Start in fullscreen"),
            ("-b", "Start as a borderless window"),
            ("-e", "Enable Steam integration"),
            ("--adaptive-sync", "Enable variable refresh rate"),
            ("--force-grab-cursor", "Always use relative mouse mode"),
            ("--hdr-enabled", "Enable HDR output"),
        ]))
        .with(inputs(&[
            ("-W", "Output width", "e.g., 1920", Integer),
            ("-H", "Output height", "e.g., 1080", Integer),
            ("-w", "Game width", "e.g., 1280", Integer),
            ("-h", "Game height", "e.g., 720", Integer),
            ("-r", "Frame rate limit", "e.g., 60", Integer),
            ("-o", "Frame rate limit when unfocused", "e.g., 30", Integer),
        ]))
        .with([OptionSpec::dropdown(
            "-F",
            "Upscale filter:",
            &["linear", "nearest", "fsr", "nis", "pixel"],
            "Upscaling filter",
            "linear",
        )])
}

fn dxvk() -> ToolConfig {
    ToolConfig::new("DXVK", "Enable DXVK Direct3D-to-Vulkan settings")
        .requires("dxvk")
        .with(toggles(&[
            ("DXVK_ASYNC", "Enable asynchronous pipeline compilation"),
            ("DXVK_GPLASYNCCACHE", "Cache asynchronously compiled pipelines"),
            ("DXVK_STATE_CACHE", "Enable the pipeline state cache"),
            ("DXVK_ENABLE_NVAPI", "Report an NVIDIA GPU to the game"),
        ]))
        .with(inputs(&[
            ("DXVK_HUD", "HUD elements to show", "e.g., fps,devinfo", Text),
            ("DXVK_STATE_CACHE_PATH", "Path to state cache", "e.g., /path/to/cache", Path),
            ("DXVK_CONFIG_FILE", "Path to dxvk.conf", "e.g., /path/to/dxvk.conf", Path),
            ("DXVK_FRAME_RATE", "Frame rate limit", "e.g., 60", Integer),
            ("DXVK_FILTER_DEVICE_NAME", "Use only GPUs matching this name", "e.g., RX 7900", Text),
        ]))
        .with([OptionSpec::dropdown(
            "DXVK_LOG_LEVEL",
            "Log level:",
            &["none", "error", "warn", "info", "debug"],
            "DXVK log verbosity",
            "info",
        )])
}

fn proton() -> ToolConfig {
    ToolConfig::new("ProtonCustom", "Enable custom Proton settings")
        .with(toggles(&[
            ("PROTON_USE_WINED3D", "Use WineD3D instead of DXVK"),
            ("PROTON_NO_ESYNC", "Disable eventfd-based synchronization"),
            ("PROTON_NO_FSYNC", "Disable futex-based synchronization"),
            ("PROTON_ENABLE_NVAPI", "Enable NVAPI support"),
            ("PROTON_HIDE_NVIDIA_GPU", "Report NVIDIA GPUs as AMD"),
            ("PROTON_ENABLE_WAYLAND", "Use the native Wayland driver"),
            ("PROTON_FORCE_LARGE_ADDRESS_AWARE", "Force large address awareness"),
            ("PROTON_NO_D3D11", "Disable Direct3D 11"),
            ("PROTON_NO_D3D10", "Disable Direct3D 10"),
            ("PROTON_LOG", "Write a Proton log to the home directory"),
        ]))
        .with(inputs(&[
            ("PROTON_LOG_DIR", "Directory for Proton logs", "e.g., /path/to/logs", Path),
            ("STEAM_COMPAT_DATA_PATH", "Override the compatibility data path", "e.g., /path/to/compatdata", Path),
        ]))
}

fn mesa_overlay() -> ToolConfig {
    ToolConfig::new("MesaOverlay", "Enable the Mesa Vulkan overlay")
        .with(toggles(&[
            ("MESA_VK_OVERLAY", "Enable the Mesa overlay layer"),
            ("MESA_VK_OVERLAY_FPS", "Display FPS"),
            ("MESA_VK_OVERLAY_FRAME_TIMING", "Display frame timings"),
            ("MESA_VK_OVERLAY_GPU_TIMING", "Display GPU timings"),
        ]))
        .with(inputs(&[
            ("VK_LAYER_MESA_OVERLAY_CONFIG", "Inline overlay configuration", "e.g., fps,frame_timing", Text),
            ("MESA_VK_OVERLAY_OUTPUT_FILE", "Path for overlay statistics", "e.g., /path/to/stats.csv", Path),
            ("MESA_VK_OVERLAY_FONT_SIZE", "Set font size", "e.g., 12", Integer),
            ("MESA_VK_OVERLAY_COLOR", "Set overlay color", "e.g., #FF0000", Color),
        ]))
        .with([OptionSpec::dropdown(
            "MESA_VK_OVERLAY_POSITION",
            "Position:",
            &["top-left", "top-right", "bottom-left", "bottom-right"],
            "Position of the Mesa overlay",
            "top-left",
        )])
        .with(sliders(&[("MESA_VK_OVERLAY_ALPHA", "Background opacity", 0.0, 1.0)]))
}

pub fn general_options() -> GeneralOptions {
    GeneralOptions {
        toggles: toggles(&[
            // Display and windowing
            ("-fullscreen", "Forces the game to run in fullscreen mode"),
            ("-windowed", "Forces the game to run in windowed mode"),
            ("-nofullscreen", "Forces the game to run in windowed mode (alternative to -windowed)"),
            ("-noborder", "Forces the game to run in borderless windowed mode"),
            // Performance and graphics
            ("-high", "Runs the game at high process priority"),
            ("-veryhigh", "Runs the game at very high process priority"),
            ("-low", "Runs the game at low process priority"),
            ("-background", "Runs the game at background priority"),
            ("-lowmemory", "Forces the game to use less memory"),
            ("-nod3d9ex", "Disables D3D9Ex mode"),
            ("-nothreading", "Disables threading"),
            ("-novsync", "Disables vertical sync"),
            ("-force-glcore", "Forces the OpenGL core profile"),
            ("-vulkan", "Forces the Vulkan renderer"),
            ("-soft", "Forces software rendering"),
            // Input
            ("-nojoy", "Disables joystick support"),
            ("-nogamepad", "Disables gamepad input"),
            ("-nomouse", "Disables mouse input"),
            ("-nomouseaccel", "Disables mouse acceleration"),
            ("-nohmd", "Disables VR support"),
            // Networking
            ("-insecure", "Allows connecting to insecure servers"),
            ("-secure", "Only connects to secure servers"),
            ("-lan", "Forces LAN mode"),
            // Debugging
            ("-console", "Opens the in-game console"),
            ("-debug", "Enables debug mode"),
            ("-nocrashdialog", "Suppresses the crash dialog"),
            ("-novid", "Skips the intro video"),
            ("-nointro", "Skips the game's intro video"),
            ("-nologo", "Skips the company logos"),
            ("-nostartupmovie", "Skips the startup movie"),
            // Audio
            ("-nosound", "Disables sound"),
            ("-noaudio", "Disables audio"),
        ]),
        inputs: inputs(&[
            ("-w", "Sets the game window width", "e.g., 1920", Integer),
            ("-h", "Sets the game window height", "e.g., 1080", Integer),
            ("-refresh", "Sets the refresh rate", "e.g., 144", Integer),
            ("-CpuCount", "Number of CPU cores the game may use", "e.g., 4", Integer),
            ("-forcemspd", "Forces a specific mouse speed", "e.g., 500", Integer),
            ("+fps_max", "Frame rate cap", "e.g., 144", Integer),
            ("+mat_picmip", "Texture detail (0 high, 1 medium, 2 low)", "e.g., 1", Integer),
            ("+r_rootlod", "Model detail (0 high, 1 medium, 2 low)", "e.g., 1", Integer),
            ("-ip", "IP address to bind to", "e.g., 192.168.1.100", Text),
            ("-port", "Port to use", "e.g., 27015", Integer),
            ("-debug_file", "Writes debug information to a file", "e.g., /path/to/debug.log", Text),
            ("-soundbuffer", "Sets the sound buffer size", "e.g., 1024", Number),
        ]),
        dropdowns: vec![OptionSpec::dropdown(
            "-dxlevel",
            "DirectX Level:",
            DX_LEVEL_PRESETS,
            "Forces a specific DirectX level (e.g., 90 for DirectX 9)",
            "90",
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_gamescope_declares_a_suffix() {
        let with_suffix: Vec<_> = builtin_tools()
            .into_iter()
            .filter(|t| t.command_suffix.is_some())
            .map(|t| t.name)
            .collect();
        assert_eq!(with_suffix, vec!["Gamescope".to_string()]);
    }

    #[test]
    fn gamemode_has_a_single_prefix_toggle() {
        let tool = gamemode();
        assert_eq!(tool.toggles().count(), 1);
        assert_eq!(tool.prefix_toggle(), Some("gamemoderun"));
    }

    #[test]
    fn every_slider_range_contains_zero() {
        for tool in builtin_tools() {
            for slider in tool.sliders() {
                if let crate::schema::OptionKind::Slider { min, max } = slider.kind {
                    assert!(min <= 0.0 && 0.0 <= max, "{} {}", tool.name, slider.key);
                }
            }
        }
    }
}
