pub mod remote_file_stat;
