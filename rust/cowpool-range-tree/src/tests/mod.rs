mod diff_tests;
