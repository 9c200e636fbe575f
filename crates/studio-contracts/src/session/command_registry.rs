#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
    pub arg_key: &'static str,
}

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "mode",
        action: "set_mode",
        arg_key: "mode",
    },
    CommandSpec {
        command: "product",
        action: "set_product",
        arg_key: "product",
    },
    CommandSpec {
        command: "size",
        action: "set_resolution",
        arg_key: "resolution",
    },
    CommandSpec {
        command: "aspect",
        action: "set_aspect_ratio",
        arg_key: "aspect_ratio",
    },
    CommandSpec {
        command: "edit",
        action: "edit_record",
        arg_key: "id",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "logo",
        action: "set_logo",
        arg_key: "path",
    },
    CommandSpec {
        command: "image",
        action: "set_image",
        arg_key: "path",
    },
    CommandSpec {
        command: "save",
        action: "save_history",
        arg_key: "path",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "generate",
        action: "generate",
        arg_key: "",
    },
    CommandSpec {
        command: "edit_last",
        action: "edit_last",
        arg_key: "",
    },
    CommandSpec {
        command: "history",
        action: "history",
        arg_key: "",
    },
    CommandSpec {
        command: "products",
        action: "list_products",
        arg_key: "",
    },
    CommandSpec {
        command: "suggest",
        action: "suggest",
        arg_key: "",
    },
    CommandSpec {
        command: "reset",
        action: "reset",
        arg_key: "",
    },
    CommandSpec {
        command: "help",
        action: "help",
        arg_key: "",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
        arg_key: "",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
        arg_key: "",
    },
];

pub const SESSION_HELP_COMMANDS: &[&str] = &[
    "/mode <mockup|edit|pro>",
    "/logo <path>",
    "/product <id>",
    "/products",
    "/image <path>",
    "/size <1K|2K|4K>",
    "/aspect <ratio>",
    "/generate",
    "/edit_last",
    "/edit <id>",
    "/history",
    "/save [dir]",
    "/suggest",
    "/reset",
    "/help",
    "/quit",
];
