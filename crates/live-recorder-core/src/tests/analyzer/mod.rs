mod level;
