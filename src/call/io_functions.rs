//! C standard library I/O primitives used to classify entry and exit points.
//!
//! Both lists are closed: reports produced by other tools rely on exactly
//! these names, so do not extend them casually.

/// Functions that bring external data into the program
pub const INPUT_FUNCTIONS: &[&str] = &[
    "canonicalize_file_name",
    "catgets",
    "confstr",
    "ctermid",
    "cuserid",
    "dgettext",
    "dngettext",
    "fgetc",
    "fgetc_unlocked",
    "fgets",
    "fgets_unlocked",
    "fpathconf",
    "fread",
    "fread_unlocked",
    "fscanf",
    "getc",
    "getchar",
    "getchar_unlocked",
    "getc_unlocked",
    "get_current_dir_name",
    "getcwd",
    "getdelim",
    "__getdelim",
    "getdents",
    "getenv",
    "gethostbyaddr",
    "gethostbyname",
    "gethostbyname2",
    "gethostent",
    "gethostid",
    "getline",
    "getlogin",
    "getlogin_r",
    "getmsg",
    "getopt",
    "_getopt_internal",
    "getopt_long",
    "getopt_long_only",
    "getpass",
    "getpmsg",
    "gets",
    "gettext",
    "getw",
    "getwd",
    "ngettext",
    "pathconf",
    "pread",
    "pread64",
    "ptsname",
    "ptsname_r",
    "read",
    "readdir",
    "readlink",
    "readv",
    "realpath",
    "recv",
    "recv_from",
    "recvmesg",
    "scanf",
    "__secure_getenv",
    "signal",
    "sysconf",
    "ttyname",
    "ttyname_r",
    "vfscanf",
    "vscanf",
];

/// Functions that make program data externally visible
pub const OUTPUT_FUNCTIONS: &[&str] = &[
    "dprintf",
    "fprintf",
    "fputc",
    "fputchar_unlocked",
    "fputc_unlocked",
    "fputs",
    "fputs_unlocked",
    "fwrite",
    "fwrite_unlocked",
    "perror",
    "printf",
    "psignal",
    "putc",
    "putchar",
    "putc_unlocked",
    "putenv",
    "putmsg",
    "putpmsg",
    "puts",
    "putw",
    "pwrite",
    "pwrite64",
    "send",
    "sendmsg",
    "sendto",
    "setenv",
    "sethostid",
    "setlogin",
    "ungetc",
    "vdprintf",
    "vfprintf",
    "vsyslog",
    "write",
    "writev",
];

pub fn is_input_function(name: &str) -> bool {
    INPUT_FUNCTIONS.contains(&name)
}

pub fn is_output_function(name: &str) -> bool {
    OUTPUT_FUNCTIONS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_are_disjoint() {
        for name in INPUT_FUNCTIONS {
            assert!(!is_output_function(name), "{} is in both lists", name);
        }
    }

    #[test]
    fn test_classification_is_exact() {
        assert!(is_input_function("read"));
        assert!(is_input_function("__secure_getenv"));
        assert!(!is_input_function("Read"));
        assert!(!is_input_function("readme"));
        assert!(is_output_function("fprintf"));
        assert!(!is_output_function("fprint"));
    }
}
